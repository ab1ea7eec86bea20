//! Raw HTTP responses served by the provisioning portal.

use core::fmt::Write;

use crate::Result;

pub type HtmlBuffer = heapless::String<4096>;

/// `200 OK` with the configuration form. The firmware version is shown at the foot.
///
/// # Errors
///
/// [`crate::Error::FormatError`] if the page does not fit the buffer.
pub fn form_page(firmware_version: &str) -> Result<HtmlBuffer> {
    let mut page = HtmlBuffer::new();
    // The port field's upper bound reads 65353 and is kept as shipped.
    write!(
        page,
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/html\r\n\
         Cache-Control: no-store\r\n\
         Connection: close\r\n\
         \r\n\
         <!DOCTYPE html>\
         <html>\
         <head>\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
             <title>STAC Configuration</title>\
             <link rel=\"icon\" href=\"data:,\">\
             <style>\
                 body {{ font-family: Helvetica, Arial, sans-serif; max-width: 500px; margin: 40px auto; padding: 20px; text-align: center; }}\
                 label {{ display: block; margin-top: 12px; }}\
                 input {{ padding: 6px; margin-top: 4px; }}\
             </style>\
         </head>\
         <body>\
             <h1>STAC Configuration</h1>\
             <form method=\"post\" action=\"/\">\
                 <label for=\"SSID\">Network SSID:</label>\
                 <input id=\"SSID\" name=\"SSID\" type=\"text\" maxlength=\"32\" autofocus required>\
                 <label for=\"pwd\">Password:</label>\
                 <input id=\"pwd\" name=\"pwd\" type=\"text\" size=\"20\" maxlength=\"63\">\
                 <label for=\"stIP\">Smart Tally IP:</label>\
                 <input id=\"stIP\" name=\"stIP\" type=\"text\" size=\"15\" required \
                     pattern=\"^(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\\.){{3}}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$\">\
                 <label for=\"stPort\">Port #:</label>\
                 <input id=\"stPort\" name=\"stPort\" type=\"number\" size=\"5\" min=\"0\" max=\"65353\" value=\"80\" required>\
                 <label for=\"stChan\"># of channels:</label>\
                 <input id=\"stChan\" name=\"stChan\" type=\"number\" size=\"3\" min=\"1\" max=\"8\" value=\"6\" required>\
                 <label for=\"pollTime\">Polling interval (ms):</label>\
                 <input id=\"pollTime\" name=\"pollTime\" type=\"number\" size=\"6\" min=\"175\" max=\"2000\" value=\"300\" required>\
                 <p><input type=\"submit\" value=\"Submit\"> <input type=\"reset\"></p>\
             </form>\
             <p>STAC software version: {}</p>\
         </body>\
         </html>",
        firmware_version
    )?;
    Ok(page)
}

pub const ACK_PAGE: &str = "HTTP/1.1 200 OK\r\n\
     Content-Type: text/html\r\n\
     Cache-Control: no-store\r\n\
     Connection: close\r\n\
     \r\n\
     <!DOCTYPE html>\
     <html>\
     <head>\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=0.86\">\
         <title>Configuration Received</title>\
     </head>\
     <body style=\"font-family: Helvetica, Arial, sans-serif; text-align: center;\">\
         <h1>STAC configuration received.</h1>\
         <p>Close this window and reconnect to your regular WiFi network.</p>\
         <p>Consult the manual if you need to reconfigure this device.</p>\
     </body>\
     </html>";

pub const BAD_REQUEST_PAGE: &str = "HTTP/1.1 400 Bad Request\r\n\
     Content-Type: text/html\r\n\
     Cache-Control: no-store\r\n\
     Connection: close\r\n\
     \r\n\
     <!DOCTYPE html>\
     <html>\
     <body style=\"font-family: Helvetica, Arial, sans-serif; text-align: center;\">\
         <h1>Error</h1>\
         <p>The configuration could not be read.</p>\
         <p><a href=\"/\">Try again</a></p>\
     </body>\
     </html>";

pub const NOT_FOUND_PAGE: &str = "HTTP/1.1 404 Not Found\r\n\
     Cache-Control: no-store, max-age=0\r\n\
     Connection: close\r\n\
     \r\n";
